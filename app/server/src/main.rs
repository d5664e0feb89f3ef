//! FILENAME: app/server/src/main.rs
// PURPOSE: Entry point. JSON-lines requests on stdin, responses on stdout.
// FORMAT (log): seq|level|category|message

fn main() -> std::io::Result<()> {
    server_lib::run()
}
