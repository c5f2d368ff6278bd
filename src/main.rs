fn main() -> anyhow::Result<()> {
    mine_raider_lib::run()
}
