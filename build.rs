use vergen::EmitBuilder;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Exposes VERGEN_BUILD_DATE for the footer.
    EmitBuilder::builder().build_date().emit()?;
    println!("cargo:rerun-if-env-changed=BACKEND_URL");
    println!("cargo:rerun-if-env-changed=API_BASE_URL");
    Ok(())
}
