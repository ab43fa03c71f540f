use gridnav_kernel::{ContentAddresser, ParameterMap, SignacAddresser};

pub fn run(parameters: String) {
    let parameters: ParameterMap = serde_json::from_str(&parameters).unwrap_or_else(|e| {
        eprintln!("error: parameters must be a JSON object: {e}");
        std::process::exit(1);
    });
    println!("{}", SignacAddresser.calc_id(&parameters));
}
