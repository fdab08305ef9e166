fn main() {
    astap_reports_lib::run()
}
