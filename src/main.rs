fn main() {
    hand_rehab_lib::run()
}
