mod cli;
mod hand;
mod pipelines;
mod shade_preview;
mod tank;


struct ExampleDesc {
    name: &'static str,
    run: fn(),
}

const EXAMPLES: &[ExampleDesc] = &[
    ExampleDesc {
        name: "hand",
        run: hand::main,
    },
    ExampleDesc {
        name: "shade-preview",
        run: shade_preview::main,
    },
    ExampleDesc {
        name: "tank",
        run: tank::main,
    },
];

fn print_examples() {
    println!("Usage: cargo run <demo_name> [--options]");
    println!();
    println!("Available demos:");
    for example in EXAMPLES {
        println!("    {}", example.name);
    }
}

pub fn main() {
    let Some(example_name) = std::env::args().nth(1) else {
        print_examples();
        return;
    };

    let Some(example) = EXAMPLES.iter().find(|example| example.name == example_name) else {
        println!("Unknown demo: {}", example_name);
        println!();
        print_examples();
        return;
    };

    (example.run)();
}
