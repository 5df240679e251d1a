//! Two counter widgets sharing one key, plus an inspector

use keystate::{BindOptions, Devtools, Storage};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug)]
struct CounterState {
    count: i32,
    step: i32,
    history: Vec<i32>,
}

impl CounterState {
    fn new() -> Self {
        Self {
            count: 0,
            step: 1,
            history: vec![0],
        }
    }

    fn increment(&self) -> Self {
        let mut next = self.clone();
        next.count += next.step;
        next.history.push(next.count);
        next
    }

    fn decrement(&self) -> Self {
        let mut next = self.clone();
        next.count -= next.step;
        next.history.push(next.count);
        next
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Shared Counter ===\n");

    let storage: Storage = Storage::new();
    let devtools = Devtools::init(&storage);

    // Seeded before any widget mounts; widgets join this value
    println!("1. Seeding COUNTER from outside any widget");
    storage
        .mutate("COUNTER".to_string(), CounterState::new())
        .expect("COUNTER holds CounterState");

    println!("\n2. Mounting two widgets");
    let mut header = storage
        .bind("COUNTER".to_string(), CounterState::new(), BindOptions::retained())
        .expect("COUNTER holds CounterState");
    header.subscribe(|state: &CounterState| {
        println!("   [header] Count: {}", state.count);
    });

    let mut footer = storage
        .bind("COUNTER".to_string(), CounterState::new(), BindOptions::default())
        .expect("COUNTER holds CounterState");
    footer.subscribe(|state: &CounterState| {
        println!("   [footer] Count: {}, Step: {}", state.count, state.step);
    });

    println!("\n3. Incrementing from the header...");
    header.update(|state| state.increment());
    header.update(|state| state.increment());

    println!("\n4. Changing step size to 5 from the footer");
    footer.update(|state| CounterState {
        step: 5,
        ..state.clone()
    });

    println!("\n5. Decrementing from the footer...");
    footer.update(|state| state.decrement());

    println!("\n6. History: {:?}", header.get().history);

    println!("\n7. Unmounting the footer (unload evicts COUNTER)");
    drop(footer);
    println!("   COUNTER registered: {}", storage.contains("COUNTER"));
    println!("   Header still sees: {}", header.get().count);

    println!(
        "\n8. Devtools: mounts={}, updates={}",
        devtools.mount_count("COUNTER"),
        devtools.update_count("COUNTER")
    );

    println!("\n✓ Shared counter complete!");
}
