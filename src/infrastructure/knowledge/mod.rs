mod http_knowledge_sink;

pub use http_knowledge_sink::HttpKnowledgeSink;
