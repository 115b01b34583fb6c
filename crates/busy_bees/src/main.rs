fn main() {
    busy_bees::run();
}
