pub mod utils;

mod integration {
    pub mod connection_tests;
    pub mod http_tests;
    pub mod messaging_tests;
}

use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}
