//! rTrackLogger main entrypoint.

use rtracklogger::run;

fn main() {
    if let Err(e) = run() {
        rtracklogger::ui::messages::error(format!("Error: {e}"));
        std::process::exit(1);
    }
}
