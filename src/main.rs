use std::env;

use wealth_planner::core::PlannerError;

#[tokio::main]
async fn main() {
    env_logger::init();

    let raw_args: Vec<String> = env::args().collect();
    if raw_args.get(1).map(|s| s.as_str()) == Some("serve") {
        let port = raw_args
            .get(2)
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(8080);
        if let Err(e) = wealth_planner::api::run_http_server(port).await {
            eprintln!("Server error: {e}");
            std::process::exit(1);
        }
        return;
    }

    match wealth_planner::api::run_cli(raw_args) {
        Ok(json) => println!("{json}"),
        Err(PlannerError::Help(text)) => print!("{text}"),
        Err(PlannerError::Usage(text)) => {
            eprint!("{text}");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
