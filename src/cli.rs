use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "tablechat", about = "Spreadsheet analysis server", version)]
pub struct Cli {
    /// Address to bind the HTTP server on.
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on.
    #[arg(long)]
    pub port: Option<u16>,

    /// Model backend: openrouter or replicate.
    #[arg(long)]
    pub backend: Option<String>,

    /// Model identifier passed to the backend.
    #[arg(long)]
    pub model: Option<String>,

    /// Python interpreter used for sandboxed execution.
    #[arg(long = "python-bin")]
    pub python_bin: Option<String>,

    /// Wall-clock limit in seconds for generated code.
    #[arg(long = "exec-timeout")]
    pub exec_timeout: Option<u64>,

    /// Origin allowed by CORS (the browser frontend).
    #[arg(long = "allow-origin")]
    pub allow_origin: Option<String>,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
