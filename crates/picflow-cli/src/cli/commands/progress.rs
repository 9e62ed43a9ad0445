//! `picflow progress` – show per-tag cursors.

use picflow_core::config::PicflowConfig;

pub fn run_progress(cfg: &PicflowConfig) {
    if cfg.targets.is_empty() {
        println!("No targets configured.");
        return;
    }
    println!("{:<16} {}", "TAG", "LAST DONE");
    for target in &cfg.targets {
        println!(
            "{:<16} {}",
            target.tag,
            target.last_done.as_deref().unwrap_or("-")
        );
    }
}
