fn main() {
    dl::cli::run();
}
