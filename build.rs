fn main() {
    let build = std::env::var("FEEDSUBMIT_BUILD").unwrap_or_else(|_| "dev".to_string());
    println!("cargo:rustc-env=FEEDSUBMIT_BUILD_ID={}", build);
    println!("cargo:rerun-if-env-changed=FEEDSUBMIT_BUILD");
}
