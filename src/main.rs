use std::process;

#[tokio::main]
async fn main() {
    match yam2spot::cli::run().await {
        Ok(()) => {}
        Err(err) => {
            println!("{err}");
            process::exit(1);
        }
    }
}
