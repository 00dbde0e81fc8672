fn main() -> anyhow::Result<()> {
  cantus_lib::run()
}
