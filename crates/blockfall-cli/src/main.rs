mod command;
mod util;
mod view;

const DEFAULT_FRAME_RATE: f64 = 50.0;
const DEFAULT_SAVE_FILE: &str = "blockfall.sav";

fn main() -> anyhow::Result<()> {
    command::run()
}
