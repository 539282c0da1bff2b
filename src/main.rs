mod app;

use app::error::TOOL_ERROR;

fn main() {
    let code = match app::run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            TOOL_ERROR
        }
    };
    std::process::exit(code);
}
