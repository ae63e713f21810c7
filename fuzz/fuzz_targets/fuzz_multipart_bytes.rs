#![no_main]

use formpart::{Constraints, Field};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let relaxed = Constraints::new().split_at_first_blank_line(true);

    for constraints in [Constraints::new(), relaxed].iter() {
        let form = match formpart::decode_with_constraints(data.to_vec(), "X-BOUNDARY", constraints) {
            Ok(form) => form,
            Err(_) => continue,
        };

        for (idx, field) in form.iter().enumerate() {
            assert_eq!(field.index(), idx);

            if let Field::File(file) = field {
                assert_eq!(Some(file.file_name()), field.file_name());
            }
        }
    }
});
