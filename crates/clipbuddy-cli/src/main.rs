fn main() {
    clipbuddy_cli::run_main();
}
