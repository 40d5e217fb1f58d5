mod chat_test;
mod common;
mod gemini_runtime_test;
mod health_test;
mod remote_runtime_test;
