use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct Jobs {
  /// Number of processing jobs. Column patterns are processed in parallel. If not specified, all available CPU threads will be used.
  #[clap(global = true, display_order = 90, long, short = 'j', default_value_t = num_cpus::get())]
  pub jobs: usize,
}

impl Jobs {
  /// Configure the global thread pool. A single job runs on the calling thread.
  pub fn init_thread_pool(&self) -> Result<(), rayon::ThreadPoolBuildError> {
    if self.jobs <= 1 {
      rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .use_current_thread()
        .build_global()
    } else {
      rayon::ThreadPoolBuilder::new().num_threads(self.jobs).build_global()
    }
  }
}
