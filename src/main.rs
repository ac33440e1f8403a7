fn main() -> std::process::ExitCode {
    wavplay_lib::run()
}
