fn main() {
    rigview_demos::main()
}
