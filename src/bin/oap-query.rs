use std::process;

use clap::Parser;
use oap_query::cli::OapQuery;

fn main() {
    let app = OapQuery::parse();
    timber::init(app.log_level);
    tracing::trace!(command_structure = ?app);

    match app.run() {
        Ok(output) => println!("{output}"),
        Err(error) => {
            tracing::debug!(?error);
            eprintln!("error: {error:#}");
            process::exit(1)
        }
    }
}
