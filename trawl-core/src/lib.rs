pub mod data;
pub mod report;
pub mod sink;

pub use sink::{PersistError, PersistReport, SinkOptions, persist};

const BANNER: &str = r#"
  _                     _
 | |_ _ __ __ ___      _| |
 | __| '__/ _` \ \ /\ / / |
 | |_| | | (_| |\ V  V /| |
  \__|_|  \__,_| \_/\_/ |_|
"#;

pub fn print_banner() {
    println!("{}", BANNER);
    println!("  v{} - single-origin crawler and link mapper\n", env!("CARGO_PKG_VERSION"));
}
