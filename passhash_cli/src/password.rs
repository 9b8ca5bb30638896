use anyhow::{Result, anyhow};

const ATTEMPTS: usize = 3;

/// Returns the given password or prompts for it, asking twice when `confirm` is set.
pub fn get_password(given: Option<String>, confirm: bool) -> Result<Vec<u8>> {
    if let Some(password) = given {
        return Ok(password.into_bytes());
    }

    if !confirm {
        return Ok(rpassword::prompt_password("Password: ")?.into_bytes());
    }

    for _ in 0..ATTEMPTS {
        let p1 = rpassword::prompt_password("Password: ")?;
        let p2 = rpassword::prompt_password("Repeat password: ")?;

        if p1 == p2 {
            return Ok(p1.into_bytes());
        }

        println!("Passwords do not match, try again");
    }

    Err(anyhow!("{ATTEMPTS} mismatched password attempts"))
}
