use flex_kit::{FlexMap, FlexPath, Value};

fn main() -> flex_kit::Result<()> {
    // --- FlexMap: build a nested config without pre-declaring levels ------
    let mut config = FlexMap::new();

    // each missing level is created on first attribute read
    config.attr("database")?.set_attr("host", "localhost")?;
    config.attr("database")?.set_attr("port", 5432)?;
    config.attr("logging")?.set_attr("level", "info")?;

    assert_eq!(
        config.attr("database")?.attr("host")?,
        &Value::from("localhost")
    );

    // bracket access stays strict: no vivification, missing keys are None
    assert!(config.get("cache").is_none());

    // hand the tree to a serializer as a plain nested map
    let plain = config.to_plain();
    assert_eq!(plain["database"].as_map().unwrap()["port"], Value::from(5432));

    println!("config: {config}");

    // --- FlexPath: normalized POSIX paths ---------------------------------
    let base = FlexPath::from(std::env::temp_dir().as_path());
    let dir = &base / "flex-kit-demo";
    let file = &dir / "notes" / ".." / "hello.txt"; // normalized on the spot
    assert_eq!(file.name(), "hello.txt");
    assert_eq!(file.parent(), dir);

    dir.mkdir_all()?;
    file.write_text("Hello, World!")?;
    println!("{} says: {}", file, file.read_text()?);

    for entry in dir.glob("*.txt")? {
        println!("matched: {entry}");
    }

    file.unlink(false)?;
    dir.rmdir()?;

    Ok(())
}
