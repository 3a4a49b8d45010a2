//! Command-line front end for todo lists and carts kept in a persistent slot.
//!
//! Each invocation opens the slot, applies one command and prints the
//! resulting items and aggregates.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use linestore_core::db::open_db;
use linestore_core::{
    init_logging_with_level, open_store, CartService, Catalog, CollectionStore, FileSlot, ItemId,
    LogLevel, Slot, SqliteSlot, StoreConfig, TodoService,
};
use std::path::{Path, PathBuf};

const DEFAULT_TODO_KEY: &str = "todos";
const DEFAULT_CART_KEY: &str = "shopeasy-cart";
const SQLITE_FILE_NAME: &str = "linestore.sqlite3";

#[derive(Parser, Debug)]
#[command(name = "linestore", version, about = "Persistent todo list and cart")]
struct Cli {
    /// Directory holding slot files, the slot database and logs.
    #[arg(long, default_value = ".linestore")]
    data_dir: PathBuf,
    /// TOML config file; defaults are used when it does not exist.
    #[arg(long, default_value = "linestore.toml")]
    config: PathBuf,
    #[arg(long, value_enum, default_value_t = Backend::File)]
    backend: Backend,
    /// Overrides the slot key from the config file.
    #[arg(long)]
    key: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    File,
    Sqlite,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(subcommand)]
    Todo(TodoCommand),
    #[command(subcommand)]
    Cart(CartCommand),
}

#[derive(Subcommand, Debug)]
enum TodoCommand {
    Add { text: String },
    List,
    Toggle { id: String },
    Done { id: String },
    Undone { id: String },
    Rm { id: String },
    ClearDone,
}

#[derive(Subcommand, Debug)]
enum CartCommand {
    Add { product_id: String },
    List,
    Qty { product_id: String, quantity: i64 },
    Rm { product_id: String },
    Clear,
    Products,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = StoreConfig::load(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    start_logging(&cli.data_dir, &config)?;

    let default_key = match cli.command {
        Command::Todo(_) => DEFAULT_TODO_KEY,
        Command::Cart(_) => DEFAULT_CART_KEY,
    };
    let key = cli.key.clone().unwrap_or_else(|| {
        if config.slot_key == linestore_core::config::DEFAULT_SLOT_KEY {
            default_key.to_string()
        } else {
            config.slot_key.clone()
        }
    });

    match cli.backend {
        Backend::File => {
            let slot = FileSlot::new(&cli.data_dir, key)?;
            run(cli.command, open_store(slot, &config), &config)
        }
        Backend::Sqlite => {
            std::fs::create_dir_all(&cli.data_dir)?;
            let conn = open_db(cli.data_dir.join(SQLITE_FILE_NAME))?;
            let slot = SqliteSlot::try_new(&conn, key)?;
            run(cli.command, open_store(slot, &config), &config)
        }
    }
}

fn start_logging(data_dir: &Path, config: &StoreConfig) -> Result<()> {
    let level = match &config.log_level {
        Some(level) => level.parse::<LogLevel>()?,
        None => LogLevel::build_default(),
    };
    std::fs::create_dir_all(data_dir)?;
    let log_dir = std::fs::canonicalize(data_dir)?.join("logs");
    let Some(log_dir) = log_dir.to_str() else {
        bail!("log directory {} is not valid UTF-8", log_dir.display());
    };
    init_logging_with_level(level, log_dir)?;
    Ok(())
}

fn run<S: Slot>(command: Command, store: CollectionStore<S>, config: &StoreConfig) -> Result<()> {
    match command {
        Command::Todo(command) => run_todo(command, TodoService::new(store)),
        Command::Cart(command) => run_cart(
            command,
            CartService::new(store, Catalog::sample(), config.pricing_policy()),
        ),
    }
}

fn run_todo<S: Slot>(command: TodoCommand, mut todos: TodoService<S>) -> Result<()> {
    match command {
        TodoCommand::Add { text } => {
            let item = todos.add_todo(&text)?;
            println!("added {}", item.id);
        }
        TodoCommand::List => {}
        TodoCommand::Toggle { id } => {
            let id = resolve_id(todos.store(), &id)?;
            todos.toggle(&id);
        }
        TodoCommand::Done { id } => {
            let id = resolve_id(todos.store(), &id)?;
            todos.set_completed(&id, true);
        }
        TodoCommand::Undone { id } => {
            let id = resolve_id(todos.store(), &id)?;
            todos.set_completed(&id, false);
        }
        TodoCommand::Rm { id } => {
            let id = resolve_id(todos.store(), &id)?;
            todos.delete(&id);
        }
        TodoCommand::ClearDone => {
            println!("removed {}", todos.clear_completed());
        }
    }

    for item in todos.todos() {
        let mark = if item.done { "x" } else { " " };
        println!("[{mark}] {}  {}", item.id, item.label);
    }
    let stats = todos.stats();
    println!(
        "{} active, {} completed, {} total",
        stats.active, stats.completed, stats.total
    );
    warn_if_unsaved(todos.store());
    Ok(())
}

fn run_cart<S: Slot>(command: CartCommand, mut cart: CartService<S>) -> Result<()> {
    match command {
        CartCommand::Add { product_id } => {
            let line = cart.add_to_cart(&product_id)?;
            println!("{} x{}", line.label, line.quantity);
        }
        CartCommand::List => {}
        CartCommand::Qty {
            product_id,
            quantity,
        } => {
            if !cart.update_quantity(&product_id, quantity) {
                bail!("{product_id} is not in the cart");
            }
        }
        CartCommand::Rm { product_id } => {
            if !cart.remove(&product_id) {
                bail!("{product_id} is not in the cart");
            }
        }
        CartCommand::Clear => {
            println!("removed {}", cart.clear());
        }
        CartCommand::Products => {
            for product in cart.catalog().products() {
                let flag = if !product.in_stock() {
                    "  (sold out)"
                } else if product.is_low_stock() {
                    "  (low stock)"
                } else {
                    ""
                };
                println!(
                    "{}  {}  {} incl. tax  stock {}{flag}",
                    product.id,
                    product.name,
                    cart.pricing().price_with_tax(product.price),
                    product.stock
                );
            }
            return Ok(());
        }
    }

    for line in cart.lines() {
        let unit = line.unit_price.unwrap_or(0.0);
        println!(
            "{}  {}  {} x {}",
            line.id,
            line.label,
            cart.pricing().price_with_tax(unit),
            line.quantity
        );
    }
    let summary = cart.summary();
    println!(
        "{} items, total {} incl. tax",
        summary.item_count, summary.rounded_total
    );
    warn_if_unsaved(cart.store());
    Ok(())
}

// Matches by printed id so numeric and text ids are both addressable.
fn resolve_id<S: Slot>(store: &CollectionStore<S>, raw: &str) -> Result<ItemId> {
    let parsed = ItemId::parse(raw);
    if store.contains(&parsed) {
        return Ok(parsed);
    }
    store
        .items()
        .iter()
        .find(|item| item.id.to_string() == raw.trim())
        .map(|item| item.id.clone())
        .with_context(|| format!("no item with id {raw}"))
}

fn warn_if_unsaved<S: Slot>(store: &CollectionStore<S>) {
    if let Some(err) = store.last_persist_error() {
        eprintln!("warning: changes were not saved: {err}");
    }
}
