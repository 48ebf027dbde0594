fn main() {
    beans::driver();
}
