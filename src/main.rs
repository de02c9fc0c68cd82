fn main() -> anyhow::Result<()> {
    record_filter::run()
}
