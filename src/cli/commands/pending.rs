use crate::cli::commands::runtime;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::outbox::{Outbox, RemoveOutcome};
use crate::errors::AppResult;
use crate::models::outbox_record::OutboxRecord;
use crate::ui::messages::{info, success, warning};
use crate::utils::colors::{RESET, color_for_code};
use crate::utils::table::Table;
use crate::utils::time::format_local;

fn render(records: &[OutboxRecord]) -> String {
    let mut table = Table::new(["ID", "USER", "CODE", "COORDINATES", "CAPTURED AT", "NOTE"]);
    for r in records {
        let code = r.code.code();
        table.add_row(vec![
            r.id.to_string(),
            r.user_id.to_string(),
            format!("{}{} {}{}", color_for_code(code), code, r.code.label(), RESET),
            r.position.coordinates(),
            format_local(&r.captured_at),
            r.note.clone(),
        ]);
    }
    table.render()
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Pending { json, remove } = cmd else {
        return Ok(());
    };

    let outbox = Outbox::open(&cfg.database)?;
    let rt = runtime()?;

    if let Some(id) = remove {
        match rt.block_on(outbox.remove(*id))? {
            RemoveOutcome::Removed => {
                success(format!("Removed outbox record #{id}"));
                let msg = format!("record #{id} removed by hand");
                if let Err(e) = rt.block_on(outbox.log("remove", "outbox", &msg)) {
                    warning(format!("Failed to write internal log: {e}"));
                }
            }
            RemoveOutcome::NotFound => warning(format!("No outbox record with id {id}")),
        }
        return Ok(());
    }

    let records = rt.block_on(outbox.list_pending())?;

    if *json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else if records.is_empty() {
        info("No pending events.");
    } else {
        println!("📦 Pending events: {}\n", records.len());
        print!("{}", render(&records));
    }

    Ok(())
}
