fn main() {
    // Re-embed pages when the frontend changes
    println!("cargo:rerun-if-changed=../../frontend/");
}
