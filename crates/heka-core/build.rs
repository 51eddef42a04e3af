fn main() -> std::io::Result<()> {
    prost_build::Config::new().compile_protos(&["proto/heka.proto"], &["proto/"])?;
    println!("cargo:rerun-if-changed=proto/heka.proto");
    Ok(())
}
