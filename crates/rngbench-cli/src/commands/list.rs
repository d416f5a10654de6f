//! `rngbench list` — print the generator variant catalog.

use rngbench_core::generator;

pub fn run() {
    println!("Available generators:\n");
    for (name, description) in generator::variant_catalog() {
        println!("  {name:<16} {description}");
    }
    println!("\nThe weather_single, multi_source, and hybrid variants fetch");
    println!("seed material over the network at construction and on reseed.");
}
