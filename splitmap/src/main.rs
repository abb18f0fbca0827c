mod application;
mod presentation;

fn main() -> splitmap_core::Result<()> {
    application::run()
}
