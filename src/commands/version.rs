use anyhow::Result;

pub fn execute() -> Result<()> {
    println!("perfsill version {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
