use trawl::{command_argument_builder, handle_crawl};
use trawl_core::print_banner;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let matches = cmd.get_matches();

    // Show banner unless --quiet flag is set
    if !matches.get_flag("quiet") {
        print_banner();
    }

    let code = handle_crawl(&matches).await;
    std::process::exit(code);
}
