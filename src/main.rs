use anyhow::Result;

fn main() -> Result<()> {
    env_logger::init();
    solver_tray::run()
}
