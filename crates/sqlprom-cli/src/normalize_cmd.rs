use crate::cli::NormalizeArgs;
use sqlprom::{normalize, query_type};

pub fn run(args: NormalizeArgs) -> anyhow::Result<()> {
    for sql in &args.statements {
        println!("{}", render(sql));
    }
    Ok(())
}

fn render(sql: &str) -> String {
    format!("{}\t{}", query_type(sql), normalize(sql))
}
