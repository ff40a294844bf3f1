pub fn run() -> anyhow::Result<()> {
    println!("sightline {}", env!("CARGO_PKG_VERSION"));
    println!("Cross-signal correlation and LLM analysis for observability backends");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_output() {
        let result = run();
        assert!(result.is_ok());
    }
}
