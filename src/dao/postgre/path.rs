use std::path::PathBuf;

/// Location of a schema file under `<dir>/migration/postgresql/`.
pub fn get_path(dir: &str, file: &str) -> PathBuf {
    ["migration", "postgresql", file]
        .iter()
        .fold(PathBuf::from(dir), |mut buf, chunk| {
            buf.push(chunk);
            buf
        })
}
