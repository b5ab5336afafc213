
#[cfg(test)]
pub mod cons {
    pub mod provider_cons;
}

#[cfg(test)]
pub mod llm {
    pub mod models {
        pub mod claude;
        pub mod openai;
        pub mod provider_handle;
    }
    pub mod stream {
        pub mod aggregator;
        pub mod chunk;
    }
    pub mod prompts;
}

#[cfg(test)]
pub mod review {
    pub mod analysis;
    pub mod github_url;
    pub mod patches;
    pub mod store;
    pub mod types;
}
