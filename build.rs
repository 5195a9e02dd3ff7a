fn main() {
    if std::env::var_os("CARGO_CFG_UNIX").is_none() {
        panic!("{} only works on unix-like systems", env!("CARGO_PKG_NAME"));
    }
}
