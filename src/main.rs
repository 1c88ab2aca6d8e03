use log::LevelFilter;
use simple_logger::SimpleLogger;

fn main() {
   let level = std::env::var("FOGCANV_LOG")
      .ok()
      .and_then(|level| level.parse::<LevelFilter>().ok())
      .unwrap_or(LevelFilter::Info);
   let _ = SimpleLogger::new().with_level(level).init();

   let default_panic_hook = std::panic::take_hook();
   std::panic::set_hook(Box::new(move |panic_info| {
      log::error!("Oh no! A fatal error occured.\n{}", panic_info);
      log::error!("This is most definitely a bug, so please file an issue.");
      default_panic_hook(panic_info);
   }));

   match fogcanv::main() {
      Ok(()) => (),
      Err(payload) => {
         log::info!("main() returned with an Err:\n{:?}", payload);
         eprintln!("An error occured:\n{:#}", payload);
         std::process::exit(1);
      }
   }
}
