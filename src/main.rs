fn main() {
    if let Err(e) = xray_lens_lib::run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
