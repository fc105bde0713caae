use anyhow::Result;

use crate::config::Config;
use crate::watcher::FileWatcher;

pub fn run(config: Config) -> Result<()> {
    println!("=== drupal-translations watch ===\n");
    let mut watcher = FileWatcher::new(config);
    watcher.run()
}
