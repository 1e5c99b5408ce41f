use clap::Parser;

// CLI argument structure, every option can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "faq-relay")]
#[command(about = "FAQ chat relay and contact-form relay for the corporate site")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    // Rate limit max requests per window
    #[arg(long, env = "RATE_LIMIT", default_value_t = 10)]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, env = "RATE_WINDOW", default_value_t = 60)]
    pub rate_window: u64,

    // How often expired rate limit entries are swept, in seconds
    #[arg(long, env = "SWEEP_INTERVAL", default_value_t = 300)]
    pub sweep_interval: u64,

    // Chat-completion endpoint (OpenAI compatible)
    #[arg(
        long,
        env = "COMPLETION_URL",
        default_value = "https://ai.gateway.lovable.dev/v1/chat/completions"
    )]
    pub completion_url: String,

    #[arg(long, env = "COMPLETION_MODEL", default_value = "google/gemini-2.5-flash")]
    pub completion_model: String,

    // Missing key is reported per request, not at startup
    #[arg(long, env = "COMPLETION_API_KEY", hide_env_values = true)]
    pub completion_api_key: Option<String>,

    // Hosted data store base url, e.g. "https://xyz.supabase.co"
    #[arg(long, env = "STORE_URL")]
    pub store_url: String,

    #[arg(long, env = "STORE_SERVICE_KEY", hide_env_values = true)]
    pub store_service_key: String,

    // Transactional email endpoint
    #[arg(long, env = "EMAIL_URL", default_value = "https://api.resend.com/emails")]
    pub email_url: String,

    #[arg(long, env = "EMAIL_API_KEY", hide_env_values = true)]
    pub email_api_key: Option<String>,

    #[arg(long, env = "EMAIL_FROM", default_value = "Website <onboarding@resend.dev>")]
    pub email_from: String,

    // Staff inbox receiving contact notifications
    #[arg(long, env = "EMAIL_TO")]
    pub email_to: String,
}
