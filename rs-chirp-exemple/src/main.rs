mod policy;

use std::sync::Arc;

use log::info;
use rs_chirp_core::{Config, CorpusLoader, GenerationService, ReadinessGate};
use tokio::io::{AsyncBufReadExt, BufReader};

use policy::ReplyPolicy;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Usage: rs-chirp-exemple [config.json] [--fast]
    // Without a file, MARKOV_ORDER, CORPUS, CORPUS_DIGEST and MAX_WORDS are
    // read from the environment
    let args: Vec<String> = std::env::args().skip(1).collect();
    let fast = args.iter().any(|arg| arg == "--fast");
    let config = match args.iter().find(|arg| !arg.starts_with("--")) {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    let bot_name = config.bot_name.clone().unwrap_or_else(|| "bot".to_owned());

    let gate = Arc::new(ReadinessGate::new());
    let service = GenerationService::from_config(Arc::clone(&gate), &config);

    // Ask for the first post before the model exists: it is queued on the
    // gate and answered as soon as the build finishes
    let first_post = {
        let service = service.clone();
        tokio::spawn(async move { service.generate(None).await })
    };

    // Print the rebuild progress as "i/total" lines
    let loader = CorpusLoader::from_config(&config)?;
    let loader_gate = Arc::clone(&gate);
    tokio::task::spawn_blocking(move || loader.run(&loader_gate, |i, total| println!("{}/{}", i, total))).await??;

    println!("[{}] [POSTED] {}", bot_name, first_post.await??);
    println!();

    // Each stdin line is an incoming post: "author: text"
    let mut policy = ReplyPolicy::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let (author, text) = match line.split_once(':') {
            Some((author, text)) => (author.trim(), text.trim()),
            None => ("someone", line.trim()),
        };
        if text.is_empty() || author.eq_ignore_ascii_case(&bot_name) {
            continue;
        }

        let has_mention = policy::mentions(text).iter().any(|name| name.eq_ignore_ascii_case(&bot_name));
        if !policy.should_reply(author, has_mention, &mut rand::rng()) {
            info!("ignoring post from {author}");
            continue;
        }

        println!("[{}] [REPLYING] [{}] {}", bot_name, author, text);
        let reply = service.generate(Some(text)).await?;
        let reply = format!("{} {}", policy::reply_prefix(text, author, &bot_name), reply);

        if !fast {
            let delay = policy::human_delay(&mut rand::rng());
            tokio::time::sleep(delay).await;
        }
        println!("[{}] [REPLIED] [{}] {}", bot_name, author, reply);
        println!();
    }

    Ok(())
}
