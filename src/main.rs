use intrinio_realtime::{Config, EquitiesOrOptionsQuote, EquitiesOrOptionsTrade, ProductFamily, Provider, RealtimeClientBuilder};
use std::time::Duration;

#[tokio::main]
async fn main() {
  env_logger::init();

  let api_key = std::env::var("INTRINIO_API_KEY").unwrap_or_default();
  if api_key.is_empty() {
    println!("INTRINIO_API_KEY environment variable not set");
    return;
  }

  let config = Config::builder(Provider::Realtime, ProductFamily::EquitiesV2)
    .api_key(api_key)
    .build()
    .expect("valid configuration");

  let client = RealtimeClientBuilder::new(config)
    .on_quote(|quote, backlog| match quote {
      EquitiesOrOptionsQuote::Equities(q) => println!("quote {} {:?} (backlog {backlog})", q.symbol, q.quote_type),
      EquitiesOrOptionsQuote::Options(q) => println!("quote {} (backlog {backlog})", q.contract.canonical()),
    })
    .on_trade(|trade, backlog| match trade {
      EquitiesOrOptionsTrade::Equities(t) => println!("trade {} @ {} (backlog {backlog})", t.symbol, t.price),
      EquitiesOrOptionsTrade::Options(t) => println!("trade {} @ {} (backlog {backlog})", t.contract.canonical(), t.price),
    })
    .start();

  client.join_firehose();

  tokio::time::sleep(Duration::from_secs(30)).await;

  client.stop().await.expect("clean shutdown");
}
