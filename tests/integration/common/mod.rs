pub mod fake_agent_server;
pub mod fake_gemini_server;
pub mod test_server;
